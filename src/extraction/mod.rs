//! Translation of solved models into lessons, and their persistence.

mod extractor;
pub use extractor::AttendanceEntry;
pub use extractor::GroupSnapshot;
pub use extractor::Lesson;
pub use extractor::LessonBatch;
pub use extractor::LocationCount;
pub use extractor::SolutionExtractor;
pub use extractor::TeacherCount;
pub use extractor::UnmetSubject;

mod store;
pub use store::JsonFileLessonStore;
pub use store::LessonStore;
pub use store::MemoryLessonStore;
