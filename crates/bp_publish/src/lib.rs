pub mod blocks;
pub mod notion;

pub use blocks::{date_line, markdown_to_blocks, Block, Span};
pub use notion::NotionClient;
