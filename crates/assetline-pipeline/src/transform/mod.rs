//! Transform steps applied by the asset tasks

pub mod banner;
pub mod css;
pub mod frontmatter;
pub mod image;
pub mod sourcemap;
pub mod template;

pub use banner::banner;
pub use frontmatter::{split_front_matter, FrontMatter};
pub use sourcemap::{split_source_map, strip_source_map};
pub use template::{BuiltinRenderer, TemplateRenderer};
