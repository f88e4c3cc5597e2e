//! Categories that transactions and budget goals are assigned to.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::{
    count_transactions_in_category, create_category, create_category_table, delete_category,
    get_all_categories, get_category, get_category_by_name, seed_default_categories,
    update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{
    Category, CategoryFormData, CategoryId, CategoryName, DEFAULT_COLOR, NewCategory,
    validate_color,
};
pub use edit::{get_edit_category_page, update_category_endpoint};
pub use list::get_categories_page;
