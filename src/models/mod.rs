pub mod question;
pub mod subject;
pub mod user;

pub use question::{Question, QuestionFields};
pub use subject::{Subject, SubjectFields};
pub use user::{AuthResponse, User, UserProfile, UserSummary};
