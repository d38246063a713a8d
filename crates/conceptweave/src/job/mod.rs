pub mod events;
pub mod model;
pub mod store;

pub use events::{JobEvent, JobEventBroadcaster};
pub use model::{
    Job, JobCounts, JobOutput, JobSnapshot, JobStatus, NewJob, StatusQuery, TransitionError,
};
pub use store::JobStore;

/// Fresh random (v4) job id.
pub fn new_job_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_job_ids_are_unique_v4() {
        let ids: HashSet<String> = (0..1000).map(|_| new_job_id()).collect();
        assert_eq!(ids.len(), 1000);

        let parsed = uuid::Uuid::parse_str(ids.iter().next().unwrap()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }
}
