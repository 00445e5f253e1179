use std::sync::Arc;

use crate::application::records::RecordService;

#[derive(Clone)]
pub struct ApiState {
    pub records: Arc<RecordService>,
}

impl ApiState {
    pub fn new(records: RecordService) -> Self {
        Self {
            records: Arc::new(records),
        }
    }
}
