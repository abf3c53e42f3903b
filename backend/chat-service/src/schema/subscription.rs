//! Live feeds. Each stream lives as long as the client's subscription; when the
//! transport drops it, the registration is cleaned up in the background.

use async_graphql::{Context, ErrorExtensions, Result, Subscription};
use futures::Stream;

use crate::models::Message;
use crate::services::ChatService;

#[derive(Default)]
pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Messages posted by anyone after the subscription started
    async fn message_posted(
        &self,
        ctx: &Context<'_>,
        user: String,
    ) -> Result<impl Stream<Item = Message>> {
        let service = ctx.data::<ChatService>()?;
        service
            .subscribe_messages(&user)
            .await
            .map_err(|e| e.extend())
    }

    /// Identities joining for the first time
    async fn user_joined(
        &self,
        ctx: &Context<'_>,
        user: String,
    ) -> Result<impl Stream<Item = String>> {
        let service = ctx.data::<ChatService>()?;
        service
            .subscribe_user_joined(&user)
            .await
            .map_err(|e| e.extend())
    }
}
