pub mod anchor;
pub mod annotation;
pub mod capability;
pub mod colors;
pub mod contentful;
pub mod finder;
pub mod index;
pub mod record;
pub mod selector;
