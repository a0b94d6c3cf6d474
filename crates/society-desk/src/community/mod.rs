//! Static community boards: society notices and the residents directory.

pub mod notices;
pub mod residents;
pub mod router;

pub use notices::{Notice, NoticeBoard, NoticeKind, NoticePriority};
pub use residents::{Resident, ResidentDirectory};
pub use router::{community_router, CommunityBoards};
