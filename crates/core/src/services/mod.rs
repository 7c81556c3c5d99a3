//! Business logic services.

pub mod comment;
pub mod feed;
pub mod follow;
pub mod form;
pub mod fragment_cache;
pub mod group;
pub mod media;
pub mod paginator;
pub mod policy;
pub mod post;
pub mod user;

pub use comment::{CommentService, CommentView};
pub use feed::{FeedService, GroupFeed, PostView, ProfileFeed};
pub use follow::{FollowResult, FollowService};
pub use form::{FormErrors, FormOutcome};
pub use fragment_cache::{
    FragmentCache, INDEX_PAGE_FRAGMENT, Rendered, generation_key, make_template_fragment_key,
};
pub use group::{CreateGroupInput, GroupService};
pub use media::{ImageFormat, ImageInfo, inspect_image};
pub use paginator::{Page, Paginator, parse_page_number};
pub use policy::Decision;
pub use post::{ImageUpload, PostDetail, PostInput, PostService};
pub use user::{CreateUserInput, UserService};
