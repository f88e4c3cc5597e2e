//! The form shared by the create and edit category pages.

use maud::{Markup, html};

use crate::{
    category::{CategoryFormData, DEFAULT_COLOR},
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
};

/// The HTTP verb the form submits with.
pub(super) enum FormMethod {
    Post,
    Put,
}

pub(super) fn category_form_view(
    endpoint: &str,
    method: FormMethod,
    values: &CategoryFormData,
    error_message: &str,
    submit_text: &str,
) -> Markup {
    let (hx_post, hx_put) = match method {
        FormMethod::Post => (Some(endpoint), None),
        FormMethod::Put => (None, Some(endpoint)),
    };
    let color = if values.color.is_empty() {
        DEFAULT_COLOR
    } else {
        &values.color
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Category Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Category Name"
                    value=(values.name)
                    required
                    autofocus
                    minlength="2"
                    maxlength="100"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    id="description"
                    type="text"
                    name="description"
                    placeholder="Optional"
                    value=(values.description)
                    maxlength="200"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="color" class=(FORM_LABEL_STYLE) { "Color" }

                input
                    id="color"
                    type="color"
                    name="color"
                    value=(color)
                    required
                    class="h-10 w-20 cursor-pointer rounded border border-gray-300 dark:border-gray-600";
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}
