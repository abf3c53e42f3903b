use async_graphql::{Context, ErrorExtensions, Object, Result as GraphQLResult};

use crate::models::Message;
use crate::services::ChatService;

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Every message ever posted, most recent first
    async fn list_messages(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<Message>> {
        let service = ctx.data::<ChatService>()?;
        service.list_messages().await.map_err(|e| e.extend())
    }

    /// Identities that have posted or subscribed
    async fn list_users(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<String>> {
        let service = ctx.data::<ChatService>()?;
        service.list_users().await.map_err(|e| e.extend())
    }
}
