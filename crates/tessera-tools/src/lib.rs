pub mod cache;
pub mod github;
pub mod registry;
pub mod serper;

pub use cache::ImageCache;
pub use github::GithubClient;
pub use registry::{GithubReleaseTool, SearchImageTool, SearchTool, Tool, ToolRegistry};
pub use serper::SerperClient;
