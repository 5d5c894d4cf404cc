use crate::gui::{Message, TesterApp};
use iced::widget::{button, column, container, row, scrollable, text, Space};
use iced::{Alignment, Element, Length};

pub fn view(app: &TesterApp) -> Element<'_, Message> {
    let header = row![
        text("Models").size(24),
        Space::with_width(Length::Fill),
        button("🔄 Refresh List")
            .on_press_maybe((!app.loading_models).then_some(Message::RefreshModels)),
    ]
    .align_y(Alignment::Center);

    let mut content = column![header].spacing(15);

    if let Some(model) = &app.pending_model_toggle {
        content = content.push(confirmation(app, model));
    }

    // Downloaded models missing from the current listing are shown too
    let mut models: Vec<String> = app.store.get_available_models().to_vec();
    for model in app.store.get_downloaded_models() {
        if !models.contains(&model) {
            models.push(model);
        }
    }

    if models.is_empty() {
        content = content.push(text("No models listed yet.").style(text::secondary));
    } else {
        let rows = models.into_iter().map(|model| {
            let downloaded = app.store.is_model_downloaded(&model);
            let (status, action) = if downloaded {
                ("✅ downloaded", "Mark as not downloaded")
            } else {
                ("not downloaded", "Mark as downloaded")
            };
            let tags = app.store.get_model_tag_count(&model);
            row![
                text(model.clone()).width(Length::Fill),
                text(format!("{} tags", tags)).style(text::secondary),
                text(status).width(Length::Fixed(130.0)),
                button(action)
                    .style(button::secondary)
                    .on_press(Message::RequestModelToggle(model)),
            ]
            .spacing(10)
            .align_y(Alignment::Center)
            .into()
        });
        content = content.push(scrollable(column(rows).spacing(6)).height(Length::Fill));
    }

    content.into()
}

fn confirmation<'a>(app: &'a TesterApp, model: &'a str) -> Element<'a, Message> {
    let downloaded = app.store.is_model_downloaded(model);
    let (current, target) = if downloaded {
        ("downloaded", "not downloaded")
    } else {
        ("not downloaded", "downloaded")
    };

    container(
        column![
            text("Manage Model Status").size(18),
            text(format!("Model: {}", model)),
            text(format!("Current status: {}", current)),
            text(format!("Would you like to mark this model as {}?", target)),
            row![
                button("Yes")
                    .style(button::primary)
                    .on_press(Message::ConfirmModelToggle),
                button("No")
                    .style(button::secondary)
                    .on_press(Message::CancelModelToggle),
            ]
            .spacing(10),
        ]
        .spacing(8),
    )
    .padding(12)
    .width(Length::Fill)
    .style(container::bordered_box)
    .into()
}
