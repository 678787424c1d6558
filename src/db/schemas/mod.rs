//! Database schemas for MedGate
//!
//! Row structures for the hosted Postgres tables, mirrored as PostgREST JSON.

mod billing;
mod content;
mod engagement;
mod question;
mod taxonomy;
mod topic;

pub use billing::{
    Profile, ProfileSubscriptionUpdate, SubscriptionStatus, SubscriptionTier, PROFILE_TABLE,
    TIER_TABLE, TRIAL_TIER_NAME,
};
pub use content::{BlogPost, NewBlogPost, NewPage, StaticPage, BLOG_TABLE, PAGE_TABLE};
pub use engagement::{
    Bookmark, Feedback, FeedbackStatus, NewFeedback, Rating, BOOKMARK_TABLE, FEEDBACK_TABLE,
    RATING_TABLE,
};
pub use question::{Question, QUESTION_TABLE};
pub use taxonomy::{
    NewVideoGroup, NewVideoSubgroup, VideoGroup, VideoSubgroup, VIDEO_GROUP_TABLE,
    VIDEO_SUBGROUP_TABLE,
};
pub use topic::{NewTopic, Topic, TopicLink, TOPIC_LINK_TABLE, TOPIC_TABLE};
