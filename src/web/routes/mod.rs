pub mod objects;
pub mod search;
pub mod users;

use std::convert::Infallible;
use std::sync::Arc;

use warp::Filter;

/// Inject a shared handle into a route.
pub(crate) fn with_shared<T>(
    value: Arc<T>,
) -> impl Filter<Extract = (Arc<T>,), Error = Infallible> + Clone
where
    T: ?Sized + Send + Sync,
{
    warp::any().map(move || value.clone())
}
