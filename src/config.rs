//! Collection naming and path assembly.

use crate::dao::paths::{CollectionPath, DocumentPath};

/// Default name of the top-level courses collection.
const DEFAULT_COURSES: &str = "courses";
/// Default name of the modules subcollection under a course.
const DEFAULT_MODULES: &str = "modules";
/// Default name of the assessments subcollection under a module.
const DEFAULT_ASSESSMENTS: &str = "gameAssessments";
/// Default name of the top-level users collection.
const DEFAULT_USERS: &str = "users";
/// Default name of the scores subcollection under a user.
const DEFAULT_SCORES: &str = "gameScores";

/// Names of the collections the accessors write into, passed to each
/// accessor at construction. The defaults reproduce the persisted layout:
///
/// ```text
/// courses/{courseId}/modules/{moduleId}/gameAssessments/{assessmentId}
/// users/{userId}/gameScores/{assessmentId}
/// ```
#[derive(Debug, Clone)]
pub struct CollectionLayout {
    courses: String,
    modules: String,
    assessments: String,
    users: String,
    scores: String,
}

impl Default for CollectionLayout {
    fn default() -> Self {
        Self {
            courses: DEFAULT_COURSES.to_owned(),
            modules: DEFAULT_MODULES.to_owned(),
            assessments: DEFAULT_ASSESSMENTS.to_owned(),
            users: DEFAULT_USERS.to_owned(),
            scores: DEFAULT_SCORES.to_owned(),
        }
    }
}

impl CollectionLayout {
    /// The layout every existing deployment uses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the course-side collections, e.g. for a sandboxed tenant.
    pub fn with_course_collections(
        mut self,
        courses: impl Into<String>,
        modules: impl Into<String>,
        assessments: impl Into<String>,
    ) -> Self {
        self.courses = courses.into();
        self.modules = modules.into();
        self.assessments = assessments.into();
        self
    }

    /// Rename the user-side collections.
    pub fn with_user_collections(
        mut self,
        users: impl Into<String>,
        scores: impl Into<String>,
    ) -> Self {
        self.users = users.into();
        self.scores = scores.into();
        self
    }

    /// Collection holding a module's assessments.
    pub fn assessments_collection(&self, course_id: &str, module_id: &str) -> CollectionPath {
        CollectionPath::root(&self.courses)
            .document(course_id)
            .collection(&self.modules)
            .document(module_id)
            .collection(&self.assessments)
    }

    /// A single assessment document.
    pub fn assessment_document(
        &self,
        course_id: &str,
        module_id: &str,
        assessment_id: &str,
    ) -> DocumentPath {
        self.assessments_collection(course_id, module_id)
            .document(assessment_id)
    }

    /// Collection holding a user's game scores.
    pub fn scores_collection(&self, user_id: &str) -> CollectionPath {
        CollectionPath::root(&self.users)
            .document(user_id)
            .collection(&self.scores)
    }

    /// A single score document; scores are keyed by the assessment id.
    pub fn score_document(&self, user_id: &str, assessment_id: &str) -> DocumentPath {
        self.scores_collection(user_id).document(assessment_id)
    }
}
