//! GraphQL schema for the chat backend
//!
//! Queries and the mutation are served over `POST /graphql`, subscriptions over
//! the WebSocket upgrade on the same route.

pub mod mutation;
pub mod query;
pub mod subscription;

use async_graphql::Schema;

use crate::services::ChatService;

pub use mutation::MutationRoot;
pub use query::QueryRoot;
pub use subscription::SubscriptionRoot;

pub type ChatSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

pub fn build_schema(service: ChatService) -> ChatSchema {
    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(service)
        .finish()
}
