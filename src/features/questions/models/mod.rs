mod answer;
mod attachment;
mod question;

pub use answer::Answer;
pub use attachment::Attachment;
pub use question::{NewPost, Question, EMPTY_POST_MESSAGE};
