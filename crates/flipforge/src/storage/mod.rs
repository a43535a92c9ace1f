pub mod filesystem;
pub mod publish;

pub use filesystem::PageStore;
pub use publish::PublishStore;
