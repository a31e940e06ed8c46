pub mod browser;
pub mod install;
pub mod locate;
pub mod paths;
pub mod platform;
pub mod release;
pub mod ui;

pub use browser::chrome_major_version;
pub use install::{Outcome, install};
pub use locate::{check_version, find_binary_in_path};
pub use paths::{add_chromedriver_to_path, add_to_path, driver_path, install_dir};
pub use platform::{Platform, driver_filename, path_separator};
pub use release::{download_url, resolve_version};
