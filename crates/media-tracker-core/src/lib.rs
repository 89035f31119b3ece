pub mod app_state;
pub mod bus;
pub mod error;
pub mod filter;
pub mod lookup;
pub mod mutation;
pub mod notice;
pub mod optimistic;
pub mod recommend;
pub mod store;
pub mod view;

pub use app_state::{AppState, ACTIVE_TAB_KEY};
pub use bus::{CatalogEvent, NotificationBus, Subscription};
pub use error::CoreError;
pub use filter::filter_items;
pub use lookup::DetailLookup;
pub use mutation::MutationCoordinator;
pub use notice::{Notice, NoticeLevel, NoticeQueue, NoticeSink};
pub use recommend::{exclude_known, RecommendationReconciler, RecommendationState};
pub use store::{ItemStore, LoadState, ViewLifetime};
pub use view::CatalogView;
