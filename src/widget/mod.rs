//! A customisable dashboard made of widgets laid out on a grid.

mod core;
mod data;
mod page;

pub use core::{
    DashboardWidget, WidgetId, WidgetType, create_widget_table, get_or_create_widgets,
    get_visible_widgets,
};
pub use data::{
    CategorySpending, GoalSummary, RecommendationSummary, WidgetData, WidgetDataState,
    get_widget_data, load_widget_data,
};
pub use page::{CustomDashboardState, get_custom_dashboard_page};
