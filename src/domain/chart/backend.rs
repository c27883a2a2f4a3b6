use crate::domain::errors::RenderingResult;
use crate::domain::market_data::{HistogramBar, PriceBar, TimedValue, VolumeBar};

use super::value_objects::{ChartOptions, ContainerId, PaneSize, Placeholder, SeriesStyle};

/// Data pushed into a series, borrowed for the duration of the call
#[derive(Debug, Clone, Copy)]
pub enum SeriesData<'a> {
    Candles(&'a [PriceBar]),
    Volumes(&'a [VolumeBar]),
    Line(&'a [TimedValue]),
    Histogram(&'a [HistogramBar]),
}

impl SeriesData<'_> {
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Candles(d) => d.len(),
            SeriesData::Volumes(d) => d.len(),
            SeriesData::Line(d) => d.len(),
            SeriesData::Histogram(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Chart library surface used by the controllers.
///
/// Handles are moved into the `remove_*`/`disconnect` calls, so a handle can
/// only be released once. Controllers keep them in `Option`s and `take()`
/// them, which makes every teardown path safe to run unconditionally.
pub trait ChartBackend: 'static {
    type Chart: Clone + 'static;
    type Series: 'static;
    type Observer: 'static;

    /// Current pixel size of the container, `None` if it does not exist
    fn container_size(&self, container: &ContainerId) -> Option<PaneSize>;

    fn create_chart(&self, container: &ContainerId, options: &ChartOptions) -> RenderingResult<Self::Chart>;

    fn remove_chart(&self, chart: Self::Chart);

    fn add_series(&self, chart: &Self::Chart, style: SeriesStyle) -> RenderingResult<Self::Series>;

    fn remove_series(&self, chart: &Self::Chart, series: Self::Series);

    fn set_series_data(&self, series: &Self::Series, data: SeriesData<'_>);

    fn fit_content(&self, chart: &Self::Chart);

    fn resize(&self, chart: &Self::Chart, size: PaneSize);

    /// Invoke `on_resize` on every size change of `container` until disconnected
    fn observe_resize(
        &self,
        container: &ContainerId,
        on_resize: Box<dyn Fn(PaneSize)>,
    ) -> RenderingResult<Self::Observer>;

    fn disconnect(&self, observer: Self::Observer);

    fn show_placeholder(&self, container: &ContainerId, placeholder: &Placeholder);

    /// Empty the container so a chart can be mounted into it
    fn clear_container(&self, container: &ContainerId);

    fn set_container_visible(&self, container: &ContainerId, visible: bool);
}
