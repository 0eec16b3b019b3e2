pub mod extract;
pub mod known;
pub mod locator;
pub mod raw;
pub mod report;
