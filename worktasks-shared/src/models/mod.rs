/// Data models for WorkTasks
///
/// Plain data types shared by the policy engine, the stores and the API. Storage
/// lives in [`crate::store`]; models carry no database handles.
///
/// # Models
///
/// - `user`: accounts and the closed [`Role`] set
/// - `task`: tasks, drafts, patches and the joined [`TaskView`]
/// - `page`: pagination request/response types

pub mod page;
pub mod task;
pub mod user;

pub use page::{Page, PageRequest};
pub use task::{NewTask, Task, TaskDraft, TaskPatch, TaskStatus, TaskView};
pub use user::{NewUser, Role, User, UserDraft, UserSummary};
