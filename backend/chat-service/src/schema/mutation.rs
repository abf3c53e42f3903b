use async_graphql::{Context, ErrorExtensions, Object, Result as GraphQLResult};

use crate::models::Message;
use crate::services::ChatService;

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn post_message(
        &self,
        ctx: &Context<'_>,
        user: String,
        text: String,
    ) -> GraphQLResult<Message> {
        let service = ctx.data::<ChatService>()?;
        service
            .post_message(&user, &text)
            .await
            .map_err(|e| e.extend())
    }
}
