pub mod explorer_ai;
pub mod link;
pub mod localization;
pub mod mission;
pub mod planet;
