use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KitError {
    #[error("kit setting {0} is required")]
    MissingSetting(&'static str),
}
