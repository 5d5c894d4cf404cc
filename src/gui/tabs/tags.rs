use crate::gui::state::SpeakerFilter;
use crate::gui::tag_editor::TagEditor;
use crate::gui::theme::parse_hex;
use crate::gui::{Message, TagEditorMessage, TesterApp};
use iced::widget::{button, column, container, radio, row, scrollable, text, text_input, Space};
use iced::{Alignment, Element, Length};

pub fn view(app: &TesterApp) -> Element<'_, Message> {
    match &app.tag_editor {
        Some(editor) => editor_view(editor),
        None => definitions_view(app),
    }
}

/// Every tag definition with its usage
fn definitions_view(app: &TesterApp) -> Element<'_, Message> {
    let tags = app.store.get_all_tags();

    let rows = tags.into_iter().filter_map(|tag| {
        let def = app.store.get_tag_definition(&tag)?;
        let models = app.store.get_speakers_by_tag(&tag).len();
        Some(
            row![
                text(tag.clone())
                    .color(parse_hex(&def.color))
                    .width(Length::Fixed(160.0)),
                text(def.description.clone()).width(Length::Fill),
                text(format!("{} speakers / {} models", def.speaker_count(), models))
                    .style(text::secondary),
                button("Delete")
                    .style(button::danger)
                    .on_press(Message::DeleteTagDefinition(tag)),
            ]
            .spacing(10)
            .align_y(Alignment::Center)
            .into(),
        )
    });

    let header = row![
        text("Speaker Tags").size(24),
        Space::with_width(Length::Fill),
        button("Manage Tags for Current Model")
            .on_press_maybe(app.model_info.as_ref().map(|_| Message::OpenTagEditor)),
    ]
    .align_y(Alignment::Center);

    let list: Element<'_, Message> = if app.store.get_all_tags().is_empty() {
        text("No tags defined yet.").style(text::secondary).into()
    } else {
        scrollable(column(rows).spacing(6)).height(Length::Fill).into()
    };

    column![header, list].spacing(15).into()
}

fn editor_view(editor: &TagEditor) -> Element<'_, Message> {
    let filters = row(SpeakerFilter::ALL.iter().map(|f| {
        radio(f.to_string(), *f, Some(editor.filter), |f| {
            Message::TagEditor(TagEditorMessage::FilterChanged(f))
        })
        .into()
    }))
    .spacing(15);

    let speakers = column(editor.visible_speakers().into_iter().map(|(speaker, tags)| {
        let selected = editor.selected_speaker.as_deref() == Some(speaker.as_str());
        button(
            row![
                text(speaker.clone()).width(Length::FillPortion(1)),
                text(tags).style(text::secondary).width(Length::FillPortion(2)),
            ]
            .spacing(10),
        )
        .width(Length::Fill)
        .style(if selected {
            button::primary
        } else {
            button::text
        })
        .on_press(Message::TagEditor(TagEditorMessage::SpeakerClicked(speaker)))
        .into()
    }))
    .spacing(2);

    let left = container(
        column![
            text("Speakers and Tags").size(18),
            text_input("Search speakers", &editor.search)
                .on_input(|s| Message::TagEditor(TagEditorMessage::SearchChanged(s))),
            filters,
            scrollable(speakers).height(Length::Fill),
        ]
        .spacing(10),
    )
    .padding(10)
    .width(Length::FillPortion(3))
    .height(Length::Fill)
    .style(container::rounded_box);

    let current = tag_list(
        editor.current_tags(),
        editor.selected_current_tag.as_deref(),
        |t| Message::TagEditor(TagEditorMessage::CurrentTagClicked(t)),
    );
    let existing = tag_list(
        editor.existing_tags(),
        editor.selected_existing_tag.as_deref(),
        |t| Message::TagEditor(TagEditorMessage::ExistingTagClicked(t)),
    );

    let right = container(
        column![
            text("Tag Management").size(18),
            text("Selected Speaker:"),
            text(editor.selected_speaker.clone().unwrap_or_else(|| "None".into())).size(16),
            text("Current Tags"),
            current,
            button("Remove Selected Tag")
                .style(button::danger)
                .on_press(Message::TagEditor(TagEditorMessage::RemoveSelectedTag)),
            text("Add Tag"),
            row![
                text_input("Tag name", &editor.new_tag_input)
                    .on_input(|s| Message::TagEditor(TagEditorMessage::NewTagChanged(s)))
                    .on_submit(Message::TagEditor(TagEditorMessage::AddNewTag)),
                button("Add Tag").on_press(Message::TagEditor(TagEditorMessage::AddNewTag)),
            ]
            .spacing(8),
            text(format!("Existing Tags ({})", editor.model())),
            existing,
            button("Add Selected Tag")
                .on_press(Message::TagEditor(TagEditorMessage::AddExistingTag)),
        ]
        .spacing(8),
    )
    .padding(10)
    .width(Length::FillPortion(2))
    .height(Length::Fill)
    .style(container::rounded_box);

    let buttons = row![
        Space::with_width(Length::Fill),
        button("Save Changes")
            .style(button::success)
            .on_press(Message::TagEditor(TagEditorMessage::Save)),
        button("Cancel")
            .style(button::secondary)
            .on_press(Message::TagEditor(TagEditorMessage::Cancel)),
    ]
    .spacing(10);

    column![
        text(format!("Speaker Tags - {}", editor.model())).size(24),
        row![left, right].spacing(15).height(Length::Fill),
        buttons,
    ]
    .spacing(10)
    .into()
}

fn tag_list<'a>(
    tags: Vec<String>,
    selected: Option<&str>,
    on_click: impl Fn(String) -> Message,
) -> Element<'a, Message> {
    if tags.is_empty() {
        return text("No tags").style(text::secondary).into();
    }
    let items = tags.into_iter().map(|tag| {
        let is_selected = selected == Some(tag.as_str());
        button(text(tag.clone()))
            .width(Length::Fill)
            .style(if is_selected {
                button::primary
            } else {
                button::secondary
            })
            .on_press(on_click(tag))
            .into()
    });
    scrollable(column(items).spacing(2))
        .height(Length::Fixed(110.0))
        .into()
}
