use askama::Template;
use axum::response::{Html, IntoResponse, Response};

use crate::error::AppError;

/// Renders an askama template as an HTML response; render failures become
/// [`AppError::Template`].
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => AppError::from(err).into_response(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate;

#[derive(Template)]
#[template(path = "menu.html")]
struct MenuTemplate;

#[derive(Template)]
#[template(path = "introduccion.html")]
struct IntroduccionTemplate;

#[derive(Template)]
#[template(path = "tips.html")]
struct TipsTemplate;

#[derive(Template)]
#[template(path = "juego.html")]
struct JuegoTemplate;

/// GET /
pub async fn index() -> impl IntoResponse {
    HtmlTemplate(IndexTemplate)
}

/// GET /menu
pub async fn menu() -> impl IntoResponse {
    HtmlTemplate(MenuTemplate)
}

/// GET /introduccion
pub async fn introduccion() -> impl IntoResponse {
    HtmlTemplate(IntroduccionTemplate)
}

/// GET /tips
pub async fn tips() -> impl IntoResponse {
    HtmlTemplate(TipsTemplate)
}

/// GET /juego
pub async fn juego() -> impl IntoResponse {
    HtmlTemplate(JuegoTemplate)
}
