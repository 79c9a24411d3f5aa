pub mod asset;
pub mod curriculum;
pub mod lecture;
pub mod payment;
pub mod purchase;
pub mod review;
pub mod user;

pub use asset::{File, Video};
pub use curriculum::{Curriculum, CurriculumSection};
pub use lecture::Lecture;
pub use payment::{PaymentOrder, PaymentStatus};
pub use purchase::Purchase;
pub use review::Review;
pub use user::User;
