use crate::driver::{DriverError, FrameDriver, Locator};
use async_trait::async_trait;
use futures::future::BoxFuture;

/// Locates a candidate element inside the driver's current frame
///
/// Absence is reported as an error and treated as "not in this frame" by the
/// searcher, so implementations never need to swallow failures themselves.
#[async_trait]
pub trait Locate<D: FrameDriver>: Send + Sync {
    async fn locate(&self, driver: &mut D) -> Result<D::Element, DriverError>;
}

#[async_trait]
impl<D: FrameDriver> Locate<D> for Locator {
    async fn locate(&self, driver: &mut D) -> Result<D::Element, DriverError> {
        driver.find_element(self).await
    }
}

/// Closure-backed [`Locate`], see [`locate_fn`]
pub struct LocateFn<F>(F);

/// Wrap a closure as a locate step
///
/// ```ignore
/// let step = locate_fn(|driver: &mut MyDriver| {
///     Box::pin(async move {
///         let _body = driver.find_element(&Locator::tag("body")).await?;
///         driver.find_element(&Locator::css("input[name='q']")).await
///     })
/// });
/// ```
pub fn locate_fn<D, F>(f: F) -> LocateFn<F>
where
    D: FrameDriver,
    F: for<'a> Fn(&'a mut D) -> BoxFuture<'a, Result<D::Element, DriverError>> + Send + Sync,
{
    LocateFn(f)
}

#[async_trait]
impl<D, F> Locate<D> for LocateFn<F>
where
    D: FrameDriver,
    F: for<'a> Fn(&'a mut D) -> BoxFuture<'a, Result<D::Element, DriverError>> + Send + Sync,
{
    async fn locate(&self, driver: &mut D) -> Result<D::Element, DriverError> {
        (self.0)(driver).await
    }
}
