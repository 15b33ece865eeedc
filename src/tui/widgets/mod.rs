pub mod prompter;
pub mod root;
pub mod setlist;
pub mod status;
