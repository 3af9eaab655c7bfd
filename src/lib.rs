//! Extraction of bibliographic resources from the posts of the AWOL blog.
//!
//! An [`Article`](article::Article) is read from an Atom entry, routed to an extraction strategy
//! by the [`DomainRouter`](router::DomainRouter), and turned into
//! [`Resource`](resource::Resource) records: the primary resource the post is about, the
//! resources subordinate to it, and related posts on the blog itself.

pub mod analytic;
pub mod article;
pub mod config;
pub mod description;
pub mod dom;
pub mod error;
pub mod extract;
pub mod identifier;
pub mod keywords;
pub mod language;
pub mod merge;
pub mod parsers;
pub mod resource;
pub mod router;
pub mod store;
pub mod text;
pub mod titles;
pub mod translator;
pub mod xml;
