use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PairStatus {
    Completed,
    Failed,
}

/// Outcome of one (pose, outfit) combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairResult {
    pub pose_index: usize,
    pub outfit_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outfit_name: Option<String>,
    pub status: PairStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl PairResult {
    pub fn completed(
        pose_index: usize,
        outfit_index: usize,
        pose_name: String,
        outfit_name: String,
        image_url: String,
        filename: String,
    ) -> Self {
        Self {
            pose_index,
            outfit_index,
            pose_name: Some(pose_name),
            outfit_name: Some(outfit_name),
            status: PairStatus::Completed,
            image_url: Some(image_url),
            error: None,
            filename: Some(filename),
        }
    }

    pub fn failed(
        pose_index: usize,
        outfit_index: usize,
        pose_name: String,
        outfit_name: String,
        error: impl Into<String>,
    ) -> Self {
        Self {
            pose_index,
            outfit_index,
            pose_name: Some(pose_name),
            outfit_name: Some(outfit_name),
            status: PairStatus::Failed,
            image_url: None,
            error: Some(error.into()),
            filename: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == PairStatus::Completed
    }
}

/// Row-major results of a poses x outfits run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub completed: usize,
    pub results: Vec<PairResult>,
}

impl BatchResult {
    pub fn new(results: Vec<PairResult>) -> Self {
        let completed = results.iter().filter(|r| r.is_completed()).count();
        Self {
            total: results.len(),
            completed,
            results,
        }
    }

    pub fn failed(&self) -> usize {
        self.total - self.completed
    }
}
