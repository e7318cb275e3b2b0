pub mod theme_service;

pub use theme_service::ThemeService;
