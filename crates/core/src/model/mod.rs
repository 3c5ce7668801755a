mod course;
mod ids;
mod lesson;
mod note;
mod path;
mod progress;

pub use course::{Course, CourseError, CourseLevel, CourseMeta, PathCourseLink};
pub use ids::{CourseId, LessonId, ParseIdError, PathId, UserId};
pub use lesson::{Lesson, LessonError, LessonKind, LessonMeta};
pub use note::Note;
pub use path::{Path, PathError};
pub use progress::{
    CourseProgress, CourseStats, LessonStatus, LessonStatusError, Progress, completion_percent,
};
