use pathway_core::model::{CourseMeta, LessonKind, LessonMeta, LessonStatus, UserId};
use pathway_core::time::fixed_clock;
use services::{AppServices, Session};
use storage::repository::Storage;

const VIDEO: &str = "https://youtu.be/dQw4w9WgXcQ";

fn app() -> AppServices {
    AppServices::from_storage(&Storage::in_memory(), fixed_clock())
}

async fn add_video_lesson(
    app: &AppServices,
    course_id: pathway_core::model::CourseId,
    title: &str,
) -> pathway_core::model::LessonId {
    app.lessons()
        .add_lesson(
            course_id,
            title.into(),
            LessonKind::Video,
            VIDEO,
            LessonMeta::default(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn completing_one_of_five_lessons_is_twenty_percent() {
    let app = app();
    let user = UserId::random();
    let session = Session::User(user);

    let path_id = app
        .paths()
        .create_path(session, "Rust".into(), None)
        .await
        .unwrap();
    let course_a = app
        .courses()
        .create_course_in_path(path_id, "A".into(), None, CourseMeta::default())
        .await
        .unwrap();
    let course_b = app
        .courses()
        .create_course_in_path(path_id, "B".into(), None, CourseMeta::default())
        .await
        .unwrap();

    let a1 = add_video_lesson(&app, course_a, "A1").await;
    add_video_lesson(&app, course_a, "A2").await;
    for title in ["B1", "B2", "B3"] {
        add_video_lesson(&app, course_b, title).await;
    }

    app.progress()
        .set_lesson_status(session, a1, LessonStatus::Completed)
        .await
        .unwrap();

    let pct = app
        .progress()
        .path_progress_percent(session, path_id)
        .await
        .unwrap();
    assert_eq!(pct, 20.0);

    let stats = app
        .progress()
        .stats_for_courses(session, &[course_a, course_b])
        .await
        .unwrap();
    assert_eq!(stats[0].1.completed_count, 1);
    assert_eq!(stats[0].1.lesson_count, 2);
    assert_eq!(stats[1].1.completed_count, 0);
    assert_eq!(stats[1].1.lesson_count, 3);
}

#[tokio::test]
async fn continuation_survives_a_deleted_lesson() {
    let app = app();
    let user = UserId::random();
    let session = Session::User(user);

    let path_id = app
        .paths()
        .create_path(session, "Rust".into(), None)
        .await
        .unwrap();
    let course_id = app
        .courses()
        .create_course_in_path(path_id, "A".into(), None, CourseMeta::default())
        .await
        .unwrap();
    let l1 = add_video_lesson(&app, course_id, "One").await;
    let l2 = add_video_lesson(&app, course_id, "Two").await;

    app.navigation()
        .record_visit(session, course_id, l2)
        .await
        .unwrap();
    let resumed = app
        .navigation()
        .continuation_lesson(session, course_id)
        .await
        .unwrap();
    assert_eq!(resumed.map(|l| l.id()), Some(l2));

    app.lessons().delete_lesson(l2).await.unwrap();
    let resumed = app
        .navigation()
        .continuation_lesson(session, course_id)
        .await
        .unwrap();
    assert_eq!(resumed.map(|l| l.id()), Some(l1));
}

#[tokio::test]
async fn watching_a_video_marks_it_in_progress_and_resumable() {
    let app = app();
    let user = UserId::random();
    let session = Session::User(user);

    let path_id = app
        .paths()
        .create_path(session, "Rust".into(), None)
        .await
        .unwrap();
    let course_id = app
        .courses()
        .create_course_in_path(path_id, "A".into(), None, CourseMeta::default())
        .await
        .unwrap();
    let lesson = add_video_lesson(&app, course_id, "One").await;

    app.progress()
        .record_playback_position(session, lesson, 187.4)
        .await
        .unwrap();
    app.navigation()
        .record_visit(session, course_id, lesson)
        .await
        .unwrap();

    let status = app.progress().lesson_status(session, lesson).await.unwrap();
    assert_eq!(status, LessonStatus::InProgress);

    let decorated = app
        .lessons()
        .lessons_with_status(session, course_id)
        .await
        .unwrap();
    assert_eq!(decorated[0].status, LessonStatus::InProgress);

    let visited = app.navigation().recently_visited(session).await.unwrap();
    assert_eq!(visited.len(), 1);
    assert_eq!(visited[0].course_id, course_id);

    // A different user sees none of it.
    let stranger = Session::User(UserId::random());
    assert_eq!(
        app.progress().lesson_status(stranger, lesson).await.unwrap(),
        LessonStatus::NotStarted
    );
    assert!(app.navigation().recently_visited(stranger).await.unwrap().is_empty());
}

#[tokio::test]
async fn notes_ride_along_with_lessons() {
    let app = app();
    let user = UserId::random();
    let session = Session::User(user);

    let path_id = app
        .paths()
        .create_path(session, "Rust".into(), None)
        .await
        .unwrap();
    let course_id = app
        .courses()
        .create_course_in_path(path_id, "A".into(), None, CourseMeta::default())
        .await
        .unwrap();
    let lesson = add_video_lesson(&app, course_id, "One").await;

    app.notes().save_note(session, lesson, "ownership!").await.unwrap();
    let note = app
        .notes()
        .note_for_lesson(session, lesson)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(note.content, "ownership!");

    let context = app.navigation().lesson_context(lesson).await.unwrap().unwrap();
    assert_eq!(context.course.title(), "A");
    assert_eq!(context.path.map(|p| p.title().to_owned()), Some("Rust".into()));
}
