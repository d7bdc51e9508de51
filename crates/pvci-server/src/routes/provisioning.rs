// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning HTTP handlers.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use pvci_server_api::{CreateRequest, EmptyResponse, SizeRequest, SizeResponse, TargetRequest};
use pvci_server_injector::{AccessMode, ProvisioningRequest, S3Source, StatusReport, TargetRef};

use crate::{api::AppState, error::ServerError};

type Body<T> = Result<Json<T>, JsonRejection>;

fn target(body: Body<TargetRequest>) -> Result<TargetRef, ServerError> {
	let Json(req) = body?;
	let target = TargetRef::from(req);
	target.validate()?;
	Ok(target)
}

/// POST /size - Count and size the objects under a prefix.
pub async fn size(
	State(state): State<AppState>,
	body: Body<SizeRequest>,
) -> Result<Json<SizeResponse>, ServerError> {
	let Json(req) = body?;
	let source = S3Source::from(req);
	let summary = state.provisioner.size(&source).await?;
	Ok(Json(summary.into()))
}

/// POST /create - Provision and respond when the workflow has finished.
pub async fn create(
	State(state): State<AppState>,
	body: Body<CreateRequest>,
) -> Result<Json<EmptyResponse>, ServerError> {
	let Json(req) = body?;
	state
		.provisioner
		.create(ProvisioningRequest::from(req))
		.await?;
	Ok(Json(EmptyResponse::default()))
}

/// POST /create-async - Start provisioning in the background.
pub async fn create_async(
	State(state): State<AppState>,
	body: Body<CreateRequest>,
) -> Result<Json<EmptyResponse>, ServerError> {
	let Json(req) = body?;
	state
		.provisioner
		.create_async(ProvisioningRequest::from(req))
		.await?;
	Ok(Json(EmptyResponse::default()))
}

/// POST /status - Job and claim state for a target.
pub async fn status(
	State(state): State<AppState>,
	body: Body<TargetRequest>,
) -> Result<Json<StatusReport>, ServerError> {
	let target = target(body)?;
	Ok(Json(state.provisioner.status(&target).await))
}

/// POST /delete - Delete the target's claim.
pub async fn delete(
	State(state): State<AppState>,
	body: Body<TargetRequest>,
) -> Result<Json<EmptyResponse>, ServerError> {
	let target = target(body)?;
	state.provisioner.delete(&target).await?;
	Ok(Json(EmptyResponse::default()))
}

/// POST /cleanup - Delete the target's copy job and its pods.
pub async fn cleanup(
	State(state): State<AppState>,
	body: Body<TargetRequest>,
) -> Result<Json<EmptyResponse>, ServerError> {
	let target = target(body)?;
	state.provisioner.cleanup(&target).await?;
	Ok(Json(EmptyResponse::default()))
}

/// POST /mode/rox - Make the bound volume ReadOnlyMany.
pub async fn mode_rox(
	State(state): State<AppState>,
	body: Body<TargetRequest>,
) -> Result<Json<EmptyResponse>, ServerError> {
	set_mode(state, body, AccessMode::ReadOnlyMany).await
}

/// POST /mode/rwo - Make the bound volume ReadWriteOnce.
pub async fn mode_rwo(
	State(state): State<AppState>,
	body: Body<TargetRequest>,
) -> Result<Json<EmptyResponse>, ServerError> {
	set_mode(state, body, AccessMode::ReadWriteOnce).await
}

async fn set_mode(
	state: AppState,
	body: Body<TargetRequest>,
	mode: AccessMode,
) -> Result<Json<EmptyResponse>, ServerError> {
	let target = target(body)?;
	state.provisioner.set_access_mode(&target, mode).await?;
	Ok(Json(EmptyResponse::default()))
}
