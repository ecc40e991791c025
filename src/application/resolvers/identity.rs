// Temporary identities for widget definitions
use crate::domain::layout::{Item, ItemDefinition, Layout};
use crate::domain::widget::WidgetRef;

pub fn temporary_identity() -> WidgetRef {
    let id = uuid::Uuid::new_v4();
    WidgetRef {
        identifier: format!("tmp-{}", id),
        uri: format!("/temp/widgets/{}", id),
    }
}

fn assign_identity(item: &mut Item) {
    if item.widget.is_definition() {
        item.widget.set_reference(temporary_identity());
    }
}

/// Gives every widget definition in the payload an identity; persisted widgets keep theirs.
pub fn add_temporary_identity_to_widgets(definitions: Vec<ItemDefinition>) -> Vec<ItemDefinition> {
    definitions
        .into_iter()
        .map(|definition| match definition {
            ItemDefinition::Item(mut item) => {
                assign_identity(&mut item);
                ItemDefinition::Item(item)
            }
            stashed => stashed,
        })
        .collect()
}

pub fn add_temporary_identity_to_layout(mut layout: Layout) -> Layout {
    for section in &mut layout.sections {
        for item in &mut section.items {
            assign_identity(item);
        }
    }
    layout
}
