use uuid::Uuid;

/// What every action gets to see about the submission it reacts to.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionContext<'a> {
    pub submission_id: Uuid,
    pub title: &'a str,
    pub payload: &'a serde_json::Value,
}
