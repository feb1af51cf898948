use crate::model::Position;
use crate::util::{Locale, StatusField, status_fields};
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct StatusPanelProps {
    pub position: Position,
    pub locale: Locale,
}

fn column(id: &'static str, fields: &[StatusField]) -> Html {
    let label_style = "font-weight:500; opacity:0.7; font-size:11px;";
    let value_style = "margin:0 0 4px 0; font-variant-numeric:tabular-nums; font-weight:600;";
    html! {
        <div id={id} style="flex:1;">
            <dl style="margin:0;">
                { for fields.iter().map(|f| html! {
                    <>
                        <dt style={label_style}>{ f.label }</dt>
                        <dd style={value_style}>{ f.value.clone() }</dd>
                    </>
                }) }
            </dl>
        </div>
    }
}

#[function_component]
pub fn StatusPanel(props: &StatusPanelProps) -> Html {
    let (left, middle) = status_fields(&props.position, props.locale);
    html! {
        <div style="display:flex; gap:16px; flex:1; font-size:14px;">
            { column("location-left", &left) }
            { column("location-middle", &middle) }
        </div>
    }
}
