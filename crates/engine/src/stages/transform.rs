// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{StageFuture, Stages};
use crate::render::render_value;
use serde_json::Value;
use wx_adapters::{DataSource, Query, ScriptEngine};
use wx_core::execution::as_payload;
use wx_core::{ExecutionContext, TransformDef};

impl<D: DataSource, E: ScriptEngine> Stages<D, E> {
    /// Map `payload` to a new payload. Chains feed each result to the next.
    pub fn transform<'a>(
        &'a self,
        def: &'a TransformDef,
        payload: Value,
        ctx: &'a ExecutionContext,
    ) -> StageFuture<'a> {
        Box::pin(async move {
            match def {
                TransformDef::Script { source } => {
                    let model = ctx.model_with_payload(&payload);
                    Ok(as_payload(self.scripts.eval(source, &model)?))
                }
                TransformDef::Search {
                    indices,
                    body,
                    timeout,
                } => {
                    let model = ctx.model_with_payload(&payload);
                    let query = Query::Search {
                        indices: indices.clone(),
                        body: render_value(&self.scripts, "body", body, &model)?,
                    };
                    Ok(as_payload(self.query(query, *timeout).await?))
                }
                TransformDef::Chain { transforms } => {
                    let mut current = payload;
                    for step in transforms {
                        current = self.transform(step, current, ctx).await?;
                    }
                    Ok(current)
                }
            }
        })
    }
}
