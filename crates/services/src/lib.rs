#![forbid(unsafe_code)]

pub mod app_services;
pub mod course_service;
pub mod error;
pub mod lesson_service;
pub mod navigation;
pub mod note_service;
pub mod path_service;
pub mod progress_service;

pub use pathway_core::{Clock, Session};

pub use app_services::AppServices;
pub use course_service::CourseService;
pub use error::{
    AppServicesError, CourseServiceError, LessonServiceError, NavigationError, NoteServiceError,
    PathServiceError, ProgressServiceError,
};
pub use lesson_service::{LessonService, LessonWithStatus};
pub use navigation::{LessonContext, NavigationService, neighbors_of};
pub use note_service::NoteService;
pub use path_service::{PathService, PathUpdate};
pub use progress_service::ProgressService;
