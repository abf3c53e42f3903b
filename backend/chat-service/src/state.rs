use crate::{config::Config, schema::ChatSchema, services::ChatService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: ChatService,
    pub schema: ChatSchema,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(service: ChatService, config: Arc<Config>) -> Self {
        Self {
            schema: crate::schema::build_schema(service.clone()),
            service,
            config,
        }
    }
}
