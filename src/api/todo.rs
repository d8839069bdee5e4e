use crate::domain::todo::driven_ports::{TaskReader, TaskWriter};
use crate::domain::todo::driving_ports::{TaskError, TaskPort};
use crate::routing_utils::{
    FailureResponse, GenericErrorResponse, Json, Path, ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::get;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;
use validator::Validate;

#[derive(OpenApi)]
#[openapi(
    paths(get_tasks, create_task, update_task, delete_task),
    components(schemas(
        dto::todo::TodoTask,
        dto::todo::NewTask,
        dto::todo::UpdateTask,
        dto::todo::Priority,
    ))
)]
/// Defines the OpenAPI documentation for the todo API
pub struct TodoApi;
/// Constant used to group todo endpoints in OpenAPI documentation
pub const TODO_API_GROUP: &str = "Todos";

/// Builds a router for the todo routes, which gets nested under "/api/todos"
pub fn todo_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(|State(app_state): AppState| async move {
                let task_service = domain::todo::TaskService {};
                get_tasks(&app_state.task_store, &task_service).await
            })
            .post(
                |State(app_state): AppState, Json(new_task): Json<dto::todo::NewTask>| async move {
                    let task_service = domain::todo::TaskService {};
                    create_task(new_task, &app_state.task_store, &task_service).await
                },
            ),
        )
        .route(
            "/:todo_id",
            axum::routing::put(
                |State(app_state): AppState,
                 Path(todo_id): Path<u32>,
                 Json(update): Json<dto::todo::UpdateTask>| async move {
                    let task_service = domain::todo::TaskService {};
                    update_task(todo_id, update, &app_state.task_store, &task_service).await
                },
            )
            .delete(|State(app_state): AppState, Path(todo_id): Path<u32>| async move {
                let task_service = domain::todo::TaskService {};
                delete_task(todo_id, &app_state.task_store, &task_service).await
            }),
        )
}

#[utoipa::path(
    get,
    path = "/api/todos",
    tag = TODO_API_GROUP,
    responses(
        (status = 200, description = "Every todo, in creation order", body = Vec<dto::todo::TodoTask>),
        (status = 500, description = "The todo store could not be read", body = crate::routing_utils::FailureBody),
    ),
)]
/// Lists all todos
async fn get_tasks(
    task_reader: &impl TaskReader,
    task_service: &impl TaskPort,
) -> Result<Json<Vec<dto::todo::TodoTask>>, ErrorResponse> {
    info!("Requested todos");
    let tasks = task_service
        .all_tasks(task_reader)
        .await
        .map_err(GenericErrorResponse)?;

    Ok(Json(tasks.into_iter().map(dto::todo::TodoTask::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/todos",
    tag = TODO_API_GROUP,
    request_body = dto::todo::NewTask,
    responses(
        (status = 201, description = "The created todo", body = dto::todo::TodoTask),
        (status = 400, description = "Invalid or malformed todo", body = crate::routing_utils::FailureBody),
        (status = 500, description = "The todo store could not be written", body = crate::routing_utils::FailureBody),
    ),
)]
/// Creates a todo. It always starts out incomplete.
async fn create_task(
    new_task: dto::todo::NewTask,
    task_writer: &impl TaskWriter,
    task_service: &impl TaskPort,
) -> Result<(StatusCode, Json<dto::todo::TodoTask>), ErrorResponse> {
    new_task
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let domain_task = domain::todo::NewTask::from(new_task);
    info!("Creating todo {domain_task}");
    let created = task_service
        .create_task(&domain_task, task_writer)
        .await
        .map_err(GenericErrorResponse)?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    put,
    path = "/api/todos/{todo_id}",
    tag = TODO_API_GROUP,
    params(("todo_id" = u32, Path, description = "ID of the todo to change")),
    request_body = dto::todo::UpdateTask,
    responses(
        (status = 200, description = "The todo after the change", body = dto::todo::TodoTask),
        (status = 400, description = "Invalid or malformed update", body = crate::routing_utils::FailureBody),
        (status = 404, description = "No todo has that ID", body = crate::routing_utils::FailureBody),
    ),
)]
/// Changes the fields of a todo that are present in the request
async fn update_task(
    todo_id: u32,
    update: dto::todo::UpdateTask,
    task_writer: &impl TaskWriter,
    task_service: &impl TaskPort,
) -> Result<Json<dto::todo::TodoTask>, ErrorResponse> {
    info!("Updating todo {todo_id}");
    update.validate().map_err(ValidationErrorResponse::from)?;

    let domain_update = domain::todo::UpdateTask::from(update);
    match task_service
        .update_task(todo_id, &domain_update, task_writer)
        .await
    {
        Ok(updated) => Ok(Json(updated.into())),
        Err(TaskError::DoesNotExist(_)) => Err(FailureResponse::not_found("Todo not found").into()),
        Err(TaskError::PortError(cause)) => Err(GenericErrorResponse(cause).into()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/todos/{todo_id}",
    tag = TODO_API_GROUP,
    params(("todo_id" = u32, Path, description = "ID of the todo to delete")),
    responses(
        (status = 204, description = "The todo is gone (or never existed)"),
        (status = 400, description = "The todo ID is not a number", body = crate::routing_utils::FailureBody),
        (status = 500, description = "The todo store could not be written", body = crate::routing_utils::FailureBody),
    ),
)]
/// Deletes a todo
async fn delete_task(
    todo_id: u32,
    task_writer: &impl TaskWriter,
    task_service: &impl TaskPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting todo {todo_id}");
    task_service
        .delete_task(todo_id, task_writer)
        .await
        .map_err(GenericErrorResponse)?;

    Ok(StatusCode::NO_CONTENT)
}
