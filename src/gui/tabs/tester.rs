use crate::gui::state::{quick_tag_options, PlaybackState};
use crate::gui::{Message, TesterApp};
use crate::tts::EngineKind;
use iced::widget::{
    button, checkbox, column, container, pick_list, row, scrollable, text, text_editor,
    text_input, Space,
};
use iced::{Alignment, Element, Length};

use super::label;

pub fn view(app: &TesterApp) -> Element<'_, Message> {
    let engine_row = row![
        label("Engine:"),
        pick_list(EngineKind::ALL, Some(app.engine), Message::EngineSelected)
            .width(Length::Fixed(160.0)),
        Space::with_width(20),
        text("Device:"),
        pick_list(app.devices.as_slice(), Some(&app.device), Message::DeviceSelected)
            .width(Length::Fill),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let model_placeholder = if app.loading_models {
        "Loading models..."
    } else {
        "Select a model"
    };
    let model_row = row![
        label("Model:"),
        pick_list(
            app.model_choices.as_slice(),
            app.selected_model_choice(),
            Message::ModelSelected
        )
        .placeholder(model_placeholder)
        .width(Length::Fill),
        button("🔄")
            .on_press_maybe((!app.loading_models).then_some(Message::RefreshModels)),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let speaker_placeholder = if app.loading_model {
        "Loading speakers..."
    } else {
        "No speakers"
    };
    let has_model = app.model.is_some();
    let speaker_row = row![
        label("Speaker:"),
        pick_list(
            app.speakers.as_slice(),
            app.speaker.clone(),
            Message::SpeakerSelected
        )
        .placeholder(speaker_placeholder)
        .width(Length::Fill),
        button("Manage Tags")
            .on_press_maybe(app.model_info.as_ref().map(|_| Message::OpenTagEditor)),
        button("🔄 Refresh").on_press_maybe(has_model.then_some(Message::RefreshSpeakers)),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let filter_row = row![
        Space::with_width(Length::Fixed(80.0)),
        checkbox("Show only untagged speakers", app.untagged_only)
            .on_toggle(Message::UntaggedOnlyToggled),
    ]
    .spacing(10);

    let language_row = row![
        label("Language:"),
        pick_list(
            app.languages.as_slice(),
            app.language.clone(),
            Message::LanguageSelected
        )
        .placeholder("Single language")
        .width(Length::Fill),
        text("Speed:"),
        text_input("1.0", &app.speed_input)
            .on_input(Message::SpeedChanged)
            .width(Length::Fixed(60.0)),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let text_section = column![
        row![
            text("Input Text:"),
            Space::with_width(Length::Fill),
            button("Reset to Default")
                .style(button::secondary)
                .on_press(Message::ResetText),
        ]
        .align_y(Alignment::Center),
        text_editor(&app.text)
            .on_action(Message::TextEdited)
            .height(Length::Fixed(120.0)),
    ]
    .spacing(5);

    let synth_label = if app.synthesizing {
        "Synthesizing..."
    } else {
        "Synthesize"
    };
    let play_label = if app.playback == PlaybackState::Idle {
        "Play"
    } else {
        "Stop"
    };
    let can_play = app.last_output.is_some() && !app.synthesizing;
    let action_row = row![
        button(synth_label)
            .padding(10)
            .style(button::primary)
            .on_press_maybe((!app.synthesizing && has_model).then_some(Message::Synthesize)),
        button(play_label)
            .padding(10)
            .on_press_maybe(can_play.then_some(Message::TogglePlayback)),
    ]
    .spacing(10);

    column![
        text("TTS Tester").size(24),
        engine_row,
        model_row,
        speaker_row,
        filter_row,
        language_row,
        text_section,
        action_row,
        quick_tagging(app),
        log_pane(app),
    ]
    .spacing(10)
    .into()
}

fn quick_tagging(app: &TesterApp) -> Element<'_, Message> {
    let has_speaker = app.speaker.is_some();
    let options = quick_tag_options(app.store.get_all_tags());

    let panel = column![
        text("Quick Tagging").size(16),
        row![
            text("Speaker:"),
            text(app.speaker.as_deref().unwrap_or("None")),
            Space::with_width(20),
            text("Tags:"),
            text(app.current_speaker_tags()).style(text::secondary),
        ]
        .spacing(8),
        row![
            pick_list(options, app.quick_tag.clone(), Message::QuickTagSelected)
                .width(Length::Fixed(200.0)),
            text_input("New tag name", &app.new_tag_input)
                .on_input(Message::NewTagNameChanged)
                .on_submit(Message::QuickAddTag)
                .width(Length::Fill),
            button("Add Tag").on_press_maybe(has_speaker.then_some(Message::QuickAddTag)),
            button("Remove Tag")
                .style(button::danger)
                .on_press_maybe(has_speaker.then_some(Message::QuickRemoveTag)),
        ]
        .spacing(8)
        .align_y(Alignment::Center),
    ]
    .spacing(8);

    container(panel)
        .padding(10)
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
}

fn log_pane(app: &TesterApp) -> Element<'_, Message> {
    let lines = app.log.entries().iter().map(|entry| {
        let line = text(format!("[{}] {}", entry.time, entry.text)).size(13);
        match entry.kind.color() {
            Some(color) => line.color(color).into(),
            None => line.into(),
        }
    });

    container(scrollable(column(lines).spacing(2).width(Length::Fill)))
        .padding(8)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(container::bordered_box)
        .into()
}
