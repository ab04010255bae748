//! Remote session gateway - SFTP endpoint access for registered projects

pub mod traits;
pub mod walk;
pub mod sftp;
pub mod memory;

pub use traits::{copy_stream, CopyError, RemoteEntry, RemoteGateway, RemoteSession, ScopedSession};
pub use walk::{RemoteWalker, WalkError};
pub use sftp::SftpGateway;
pub use memory::MemoryGateway;
