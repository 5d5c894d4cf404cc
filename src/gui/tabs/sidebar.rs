use crate::gui::state::{short_model_name, PlaybackState};
use crate::gui::{Message, Tab, TesterApp};
use iced::widget::{button, column, container, horizontal_rule, text, Column, Space};
use iced::{Element, Length};

const TABS: [(Tab, &str); 3] = [
    (Tab::Tester, "🗣️ Tester"),
    (Tab::Tags, "🏷️ Speaker Tags"),
    (Tab::Models, "📦 Models"),
];

pub fn view(app: &TesterApp) -> Element<'_, Message> {
    let nav = TABS.iter().fold(Column::new().spacing(4), |col, (tab, label)| {
        let style = if app.current_tab == *tab {
            button::primary
        } else {
            button::text
        };
        col.push(
            button(text(*label))
                .width(Length::Fill)
                .padding([8, 12])
                .style(style)
                .on_press(Message::TabSelected(*tab)),
        )
    });

    column![
        text("TTS Tester").size(20),
        text(app.engine.label()).size(13).style(text::secondary),
        horizontal_rule(1),
        nav,
        Space::with_height(Length::Fill),
        status(app),
    ]
    .spacing(10)
    .padding(12)
    .width(Length::Fixed(190.0))
    .height(Length::Fill)
    .into()
}

/// What the engine is doing right now
fn status(app: &TesterApp) -> Element<'_, Message> {
    let activity = if app.synthesizing {
        "⏳ Synthesizing"
    } else if app.playback != PlaybackState::Idle {
        "🔊 Playing"
    } else if app.loading_models || app.loading_model {
        "🔄 Loading"
    } else {
        "Idle"
    };
    let model = app
        .model
        .as_deref()
        .map(short_model_name)
        .unwrap_or_else(|| "No model".to_string());

    container(
        column![
            text(activity).size(13),
            text(model).size(12).style(text::secondary),
            text(app.device.to_string()).size(12).style(text::secondary),
        ]
        .spacing(2),
    )
    .padding(8)
    .width(Length::Fill)
    .style(container::bordered_box)
    .into()
}
