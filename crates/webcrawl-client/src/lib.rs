pub mod fetcher;
pub mod html;

pub use fetcher::{DEFAULT_USER_AGENT, ReqwestDownloader};
pub use html::HtmlPage;
