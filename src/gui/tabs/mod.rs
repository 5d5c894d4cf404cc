//! Tab views

pub mod models;
pub mod sidebar;
pub mod tags;
pub mod tester;

use iced::widget::text;
use iced::{Element, Length};

use crate::gui::Message;

/// Fixed-width field label
pub(crate) fn label(content: &str) -> Element<'_, Message> {
    text(content).width(Length::Fixed(80.0)).into()
}
