//! External HTTP capabilities consumed by command handlers and the queue.
//!
//! Each capability is a trait so handlers can be exercised against
//! in-process fakes; the concrete clients speak HTTP through `reqwest`.

pub mod generation;
pub mod playlist;
pub mod video_search;

pub use generation::{Generator, OpenAiGenerator};
pub use playlist::{AddTrackOutcome, PlaylistEntry, PlaylistService, StreamDjClient, Track};
pub use video_search::{VideoSearch, YouTubeSearch};
