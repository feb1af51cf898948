use std::rc::Rc;

use super::{camera_view::CameraView, locator_view::LocatorView};
use crate::config::AppConfig;
use crate::platform::nav::{self, Screen};
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct AppProps {
    pub config: Rc<AppConfig>,
}

#[function_component(App)]
pub fn app(props: &AppProps) -> Html {
    let screen = use_state(nav::current_screen);

    let content = match *screen {
        Screen::Locator => html! { <LocatorView /> },
        Screen::Camera => html! { <CameraView /> },
    };

    // Config reaches both screens through context, no prop drilling
    html! { <ContextProvider<Rc<AppConfig>> context={props.config.clone()}>{ content }</ContextProvider<Rc<AppConfig>>> }
}
