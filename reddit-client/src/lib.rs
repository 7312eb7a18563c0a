pub mod api;

pub use api::{RedditApiClient, RedditListing, RedditListingChild, RedditListingData, RedditPostData};
